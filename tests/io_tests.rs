use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};
use ndarray_npy::write_npy;
use online_meme_rs::config::{EmConfig, FitMode};
use online_meme_rs::driver::{run_meme, run_meme_files};
use online_meme_rs::error::MotifError;
use online_meme_rs::fasta;
use online_meme_rs::motif_io::{load_initial_motif, read_meme_motifs, read_npy_motif};
use online_meme_rs::report::write_meme;

fn temp_path(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("online_meme_rs_{}_{}", std::process::id(), name))
        .to_string_lossy()
        .into_owned()
}

#[test]
fn test_read_fasta() {
    let df = fasta::read_fasta("tests/data/sites.fasta").unwrap();
    assert_eq!(df.height(), 5);
    assert_eq!(df.width(), 2);

    let sequences = fasta::sequences(&df).unwrap();
    assert_eq!(sequences, vec!["ACGT", "ACGT", "CATG", "GGTA", "ACGT"]);

    // test file does not exist
    let result = fasta::read_fasta("tests/data/nonexistent.fasta");
    assert!(matches!(result, Err(MotifError::Io(_))));
}

#[test]
fn test_read_fasta_rejects_headerless_data() {
    let path = temp_path("headerless.fasta");
    std::fs::write(&path, "ACGT\n>late\nACGT\n").unwrap();
    assert!(matches!(
        fasta::read_fasta(&path),
        Err(MotifError::InvalidFileFormat(_))
    ));
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_filter_valid() {
    let df = fasta::read_fasta("tests/data/mixed.fasta").unwrap();
    assert_eq!(df.height(), 4);
    let filtered = fasta::filter_valid(&df, 4).unwrap();
    assert_eq!(fasta::sequences(&filtered).unwrap(), vec!["ACGT", "TTGA"]);
}

#[test]
fn test_read_meme_motifs() {
    let motifs = read_meme_motifs("tests/data/acgt.meme").unwrap();
    assert_eq!(motifs.len(), 2);
    assert_eq!(motifs[0].0, "ACGT_start");
    assert_eq!(motifs[0].1.dim(), (4, 4));
    assert_eq!(motifs[0].1.row(3), array![0.1, 0.1, 0.1, 0.7]);
    assert_eq!(motifs[1].0, "AT_rich");
    assert_eq!(motifs[1].1.dim(), (2, 4));
}

#[test]
fn test_load_initial_motif_checks_width_and_rows() {
    let pwm = load_initial_motif("tests/data/acgt.meme", 4).unwrap();
    assert_eq!(pwm[[0, 0]], 0.7);

    assert!(matches!(
        load_initial_motif("tests/data/acgt.meme", 6),
        Err(MotifError::InvalidPwm(_))
    ));
    assert!(matches!(
        load_initial_motif("tests/data/bad_rows.meme", 4),
        Err(MotifError::InvalidPwm(_))
    ));
    assert!(load_initial_motif("tests/data/missing.meme", 4).is_err());
}

#[test]
fn test_npy_motif_round_trip() {
    let path = temp_path("motif.npy");
    let pwm: Array2<f64> = Array2::eye(4);
    write_npy(&path, &pwm).unwrap();

    assert_eq!(read_npy_motif(&path).unwrap(), pwm);
    assert_eq!(load_initial_motif(&path, 4).unwrap(), pwm);

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_config_defaults_and_toml() {
    let config = EmConfig::default();
    assert_eq!(config.width, 10);
    assert_eq!(config.step, 0.85);
    assert_eq!(config.initial_lambda, 0.5);
    assert_eq!(config.mode, FitMode::Online);
    config.validate().unwrap();

    let config = EmConfig::from_toml_file("tests/data/batch.toml").unwrap();
    assert_eq!(config.width, 4);
    assert_eq!(config.step, 0.5);
    assert_eq!(
        config.mode,
        FitMode::Batch {
            tolerance: 1e-8,
            max_iterations: 1000
        }
    );

    assert!(matches!(
        EmConfig::from_toml_str("step = 1.5"),
        Err(MotifError::InvalidParameter { .. })
    ));
    assert!(matches!(
        EmConfig::from_toml_str("width = \"wide\""),
        Err(MotifError::Config(_))
    ));
    let invalid = EmConfig {
        processes: Some(0),
        ..EmConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_run_meme_online() {
    let config = EmConfig {
        width: 4,
        ..EmConfig::default()
    };
    let report = run_meme(["ACGT", "ACGT", "TGCA"], Array2::eye(4), &config).unwrap();
    assert_eq!(report.sequences, 3);
    assert_eq!(report.iterations, 1);
    assert_eq!(report.model.width(), 4);
    assert!((0.0..=1.0).contains(&report.model.lambda));

    // empty input returns the starting point
    let report = run_meme(Vec::<String>::new(), Array2::eye(4), &config).unwrap();
    assert_eq!(report.sequences, 0);
    assert_eq!(report.model.motif, Array2::<f64>::eye(4));
    assert_eq!(report.model.lambda, 0.5);
}

#[test]
fn test_run_meme_rejects_bad_inputs() {
    let config = EmConfig {
        width: 4,
        ..EmConfig::default()
    };
    assert!(matches!(
        run_meme(["ACGT"], Array2::eye(3), &config),
        Err(MotifError::InvalidPwm(_))
    ));
    assert!(matches!(
        run_meme(["ACGT", "ACG"], Array2::eye(4), &config),
        Err(MotifError::InvalidSequence { position: 1, .. })
    ));
}

#[test]
fn test_run_meme_files_batch_mode() {
    let config = EmConfig {
        width: 4,
        processes: Some(2),
        mode: FitMode::batch(),
        ..EmConfig::default()
    };
    let report = run_meme_files("tests/data/sites.fasta", "tests/data/acgt.meme", &config).unwrap();
    assert_eq!(report.sequences, 5);
    assert!(report.iterations >= 1);
    for row in report.model.motif.outer_iter() {
        assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
    }
    // three of five sequences are the motif
    assert!(report.model.lambda > 0.5);
}

#[test]
fn test_run_meme_files_skip_invalid() {
    let config = EmConfig {
        width: 4,
        ..EmConfig::default()
    };
    assert!(run_meme_files("tests/data/mixed.fasta", "tests/data/acgt.meme", &config).is_err());

    let config = EmConfig {
        skip_invalid: true,
        ..config
    };
    let report = run_meme_files("tests/data/mixed.fasta", "tests/data/acgt.meme", &config).unwrap();
    assert_eq!(report.sequences, 2);
}

#[test]
fn test_write_meme_output_is_readable() {
    let config = EmConfig {
        width: 4,
        ..EmConfig::default()
    };
    let report = run_meme(["ACGT", "ACGT"], Array2::eye(4), &config).unwrap();

    let path = temp_path("fitted.meme");
    write_meme(&path, "fitted", &report).unwrap();

    let motifs = read_meme_motifs(&path).unwrap();
    assert_eq!(motifs.len(), 1);
    assert_eq!(motifs[0].0, "fitted");
    for row in motifs[0].1.outer_iter() {
        assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-5);
    }
    assert_abs_diff_eq!(motifs[0].1[[1, 1]], 1.0, epsilon = 1e-6);

    std::fs::remove_file(path).unwrap();
}
