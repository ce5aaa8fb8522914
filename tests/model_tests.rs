use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};
use online_meme_rs::encode::IndicatorMatrix;
use online_meme_rs::error::MotifError;
use online_meme_rs::model::{
    background_likelihood, background_matrix, log_likelihood, motif_likelihood,
    uniform_background, validate_pwm, MixtureModel,
};

fn acgt_motif() -> Array2<f64> {
    Array2::eye(4)
}

#[test]
fn test_uniform_background() {
    let bg = uniform_background(3);
    assert_eq!(bg.dim(), (3, 4));
    assert!(bg.iter().all(|&p| p == 0.25));
}

#[test]
fn test_background_matrix_replicates_rows() {
    let dist = array![0.1, 0.2, 0.3, 0.4];
    let bg = background_matrix(dist.view(), 3);
    for row in bg.outer_iter() {
        assert_eq!(row, dist);
    }
}

#[test]
fn test_motif_likelihood_product() {
    let motif = array![
        [0.4, 0.3, 0.2, 0.1],
        [0.1, 0.2, 0.3, 0.4],
        [0.25, 0.25, 0.25, 0.25],
    ];
    let indicator = IndicatorMatrix::encode("ATG", 3).unwrap();
    assert_abs_diff_eq!(motif_likelihood(&indicator, &motif).unwrap(), 0.4 * 0.4 * 0.25, epsilon = 1e-12);
    assert_abs_diff_eq!(
        log_likelihood(&indicator, &motif).unwrap(),
        (0.4f64 * 0.4 * 0.25).ln(),
        epsilon = 1e-12
    );
}

#[test]
fn test_background_likelihood_uniform() {
    let indicator = IndicatorMatrix::encode("ACGT", 4).unwrap();
    let bg = uniform_background(4);
    assert_abs_diff_eq!(background_likelihood(&indicator, &bg).unwrap(), 0.25f64.powi(4), epsilon = 1e-15);
}

#[test]
fn test_zero_probability_gives_zero_likelihood() {
    let indicator = IndicatorMatrix::encode("AAAA", 4).unwrap();
    assert_eq!(motif_likelihood(&indicator, &acgt_motif()).unwrap(), 0.0);
    assert_eq!(log_likelihood(&indicator, &acgt_motif()).unwrap(), f64::NEG_INFINITY);
}

#[test]
fn test_long_motif_does_not_underflow_in_log_space() {
    let width = 600;
    let motif = Array2::from_elem((width, 4), 0.25);
    let sequence = "ACGT".repeat(width / 4);
    let indicator = IndicatorMatrix::encode(&sequence, width).unwrap();

    // the raw product underflows, the log does not
    assert_eq!(motif_likelihood(&indicator, &motif).unwrap(), 0.0);
    assert_abs_diff_eq!(
        log_likelihood(&indicator, &motif).unwrap(),
        width as f64 * 0.25f64.ln(),
        epsilon = 1e-9
    );
}

#[test]
fn test_new_model_validation() {
    let model = MixtureModel::with_uniform_background(0.5, acgt_motif()).unwrap();
    assert_eq!(model.width(), 4);
    assert_eq!(model.background_distribution(), array![0.25, 0.25, 0.25, 0.25]);

    assert!(matches!(
        MixtureModel::with_uniform_background(1.5, acgt_motif()),
        Err(MotifError::InvalidParameter { .. })
    ));

    let mut bad = acgt_motif();
    bad[[1, 0]] = 0.5;
    assert!(matches!(
        MixtureModel::with_uniform_background(0.5, bad),
        Err(MotifError::InvalidPwm(_))
    ));

    let mut uneven_bg = uniform_background(4);
    uneven_bg.row_mut(2).assign(&array![0.7, 0.1, 0.1, 0.1]);
    assert!(matches!(
        MixtureModel::new(0.5, acgt_motif(), uneven_bg),
        Err(MotifError::InvalidPwm(_))
    ));

    assert!(matches!(
        MixtureModel::new(0.5, acgt_motif(), uniform_background(3)),
        Err(MotifError::InvalidPwm(_))
    ));
}

#[test]
fn test_validate_pwm_shape() {
    let three_columns = Array2::from_elem((2, 3), 1.0 / 3.0);
    assert!(validate_pwm(&three_columns, "motif").is_err());
    let empty = Array2::<f64>::zeros((0, 4));
    assert!(validate_pwm(&empty, "motif").is_err());
    let negative = array![[1.5, -0.5, 0.0, 0.0]];
    assert!(validate_pwm(&negative, "motif").is_err());
}

#[test]
fn test_normalized_motif() {
    let model = MixtureModel::with_uniform_background(0.5, acgt_motif()).unwrap();
    let mut scaled = model.clone();
    scaled.motif.mapv_inplace(|p| p * 0.3);
    scaled.motif.row_mut(3).fill(0.0);

    let normalized = scaled.normalized_motif();
    assert_abs_diff_eq!(normalized.row(0), acgt_motif().row(0), epsilon = 1e-12);
    assert_eq!(normalized.row(3), array![0.25, 0.25, 0.25, 0.25]);
}

#[test]
fn test_display_dump() {
    let model = MixtureModel::with_uniform_background(0.5, acgt_motif()).unwrap();
    let text = model.to_string();
    assert!(text.starts_with("lambda: 0.500000"));
    assert!(text.contains("motif:"));
    assert!(text.contains("background:"));
    assert!(text.contains("0.25000"));
}
