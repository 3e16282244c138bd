use std::fs;
use std::path::{Path, PathBuf};

use acmodel_rs::{AcModel, AcModelError, Hmm, PhoneMap, StateRef, TransitionRef};

const MACROS: &str = r#"~o
<STREAMINFO> 1 2
<VECSIZE> 2<NULLD><MFCC_0_D_A><DIAGC>
~v "varFloor1"
<VARIANCE> 2
 0.01 0.01
~s "silst"
<MEAN> 2
 1.0 1.0
<VARIANCE> 2
 1.0 1.0
~t "T_3"
<TRANSP> 3
 0.0 1.0 0.0
 0.0 0.5 0.5
 0.0 0.0 0.0
"#;

fn hmm_text(name: &str, mean: f64, stay: f64) -> String {
    format!(
        "~h \"{name}\"\n<BEGINHMM>\n<NUMSTATES> 3\n<STATE> 2\n<MEAN> 2\n {mean} {mean}\n<VARIANCE> 2\n 1.0 1.0\n<TRANSP> 3\n 0.0 1.0 0.0\n 0.0 {stay} {}\n 0.0 0.0 0.0\n<ENDHMM>\n",
        1.0 - stay
    )
}

fn sil_text() -> &'static str {
    "~h \"sil\"\n<BEGINHMM>\n<NUMSTATES> 3\n<STATE> 2\n~s \"silst\"\n~t \"T_3\"\n<ENDHMM>\n"
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

/// `macros` + `hmmdefs` pair holding `sil` and the given phones.
fn write_model(dir: &Path, prefix: &str, phones: &[(&str, f64)]) -> Vec<PathBuf> {
    let mut hmmdefs = String::from("~o\n<STREAMINFO> 1 2\n<VECSIZE> 2<NULLD><MFCC_0_D_A><DIAGC>\n");
    hmmdefs.push_str(sil_text());
    for (name, mean) in phones {
        hmmdefs.push_str(&hmm_text(name, *mean, 0.6));
    }
    vec![
        write(dir, &format!("{prefix}_macros"), MACROS),
        write(dir, &format!("{prefix}_hmmdefs"), &hmmdefs),
    ]
}

fn first_mean(model: &AcModel, phone: &str) -> f64 {
    let hmm = model.get_hmm(phone).unwrap();
    let state = hmm.get_state(2).unwrap().as_inline().unwrap();
    state.streams[0].mixtures[0].mean[0]
}

#[test]
fn macros_and_hmmdefs_load_as_one_model() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_model(dir.path(), "base", &[("a", 0.0), ("e", 1.0)]);
    let model = AcModel::load_htk(&paths).unwrap();

    assert_eq!(model.names().collect::<Vec<_>>(), ["sil", "a", "e"]);
    assert_eq!(model.parameter_kind(), Some("MFCC_0_D_A"));
    assert_eq!(model.vec_size(), Some(2));
    let sil = model.get_hmm("sil").unwrap();
    assert!(matches!(sil.get_state(2), Some(StateRef::Macro(name)) if name == "silst"));
    assert!(matches!(&sil.transition, TransitionRef::Macro(name) if name == "T_3"));
}

#[test]
fn merged_model_is_saved_and_reloaded() {
    let dir = tempfile::tempdir().unwrap();
    let base_paths = write_model(dir.path(), "base", &[("a", 0.0), ("e", 2.0)]);
    let other_paths = write_model(dir.path(), "other", &[("a", 4.0), ("i", 8.0)]);

    let mut base = AcModel::load_htk(&base_paths).unwrap();
    let other = AcModel::load_htk(&other_paths).unwrap();
    let report = base.merge_model(&other, 0.25).unwrap();

    // sil and a are shared, i is new, e only exists in the base.
    assert_eq!(report.appended, 1);
    assert_eq!(report.interpolated, 2);
    assert_eq!(report.kept, 1);
    assert_eq!(report.changed, 0);
    assert!(report.failures.is_empty());

    let out = dir.path().join("merged");
    base.save_htk(&out).unwrap();
    let reloaded = AcModel::load_htk([&out]).unwrap();
    assert_eq!(reloaded, base);
    assert_eq!(reloaded.names().collect::<Vec<_>>(), ["sil", "a", "e", "i"]);
    assert!((first_mean(&reloaded, "a") - 3.0).abs() < 1e-12);
    assert_eq!(first_mean(&reloaded, "e"), 2.0);
    assert_eq!(first_mean(&reloaded, "i"), 8.0);
    assert!(reloaded.hmms().iter().all(Hmm::is_resolved));

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("~v \"varFloor1\""));
    assert!(!text.contains("~s \"silst\""));
}

#[test]
fn merge_rejects_other_feature_kind() {
    let dir = tempfile::tempdir().unwrap();
    let base_paths = write_model(dir.path(), "base", &[("a", 0.0)]);
    let mut base = AcModel::load_htk(&base_paths).unwrap();
    let plp = MACROS.replace("MFCC_0_D_A", "PLP_0_D_A");
    let other_path = write(dir.path(), "plp", &format!("{plp}{}", hmm_text("a", 1.0, 0.6)));
    let other = AcModel::load_htk([&other_path]).unwrap();

    let before = base.clone();
    let err = base.merge_model(&other, 0.5).unwrap_err();
    assert!(matches!(err, AcModelError::TypeMismatch { .. }));
    assert_eq!(base, before);
}

#[test]
fn missing_model_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AcModel::load_htk([dir.path().join("hmmdefs")]).unwrap_err();
    assert!(matches!(err, AcModelError::Io { .. }));
}

#[test]
fn phone_map_file_renames_triphones() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_model(dir.path(), "base", &[("a-e+a", 0.0), ("e", 1.0)]);
    let map_path = write(dir.path(), "phones.map", "a aa\ne eh\n");

    let mut model = AcModel::load_htk(&paths).unwrap();
    let map = PhoneMap::load(&map_path).unwrap();
    assert_eq!(model.replace_phones(&map, false).unwrap(), 2);
    assert_eq!(model.names().collect::<Vec<_>>(), ["sil", "aa-eh+aa", "eh"]);

    assert_eq!(model.extract_monophones(), 1);
    assert_eq!(model.names().collect::<Vec<_>>(), ["sil", "eh"]);
}

#[test]
fn proto_written_to_disk_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let proto = Hmm::create_proto(3, 2).unwrap();
    let path = dir.path().join("proto");
    proto.save(&path).unwrap();

    let loaded = Hmm::load(&path).unwrap();
    assert_eq!(loaded, proto);
    assert_eq!(loaded.state_count(), 5);
}
