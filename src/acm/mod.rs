pub mod acmodel;
pub mod hmm;
pub mod phone_map;

pub use acmodel::AcModel;
pub use hmm::Hmm;
pub use phone_map::PhoneMap;
