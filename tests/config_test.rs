//! Tests for model configuration validation and persistence

use burn::backend::NdArray;
use burn::config::Config;
use burn::tensor::Tensor;
use tensor_rnn::cells::{CellKind, CellStack, Contraction, StepCell};
use tensor_rnn::config::ModelConfig;
use tensor_rnn::model::TensorRnnModel;
use tensor_rnn::TensorRnnError;

type Backend = NdArray<f32>;

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let config = ModelConfig::new(3, 3)
        .with_hidden_size(12)
        .with_uniform_rank(3, 4)
        .with_contraction(Contraction::Dense);

    config.save(&path).unwrap();
    let loaded = ModelConfig::load(&path).unwrap();
    assert_eq!(loaded.rank_vals, vec![4, 4]);
    assert_eq!(loaded.num_orders, 3);
    assert_eq!(loaded.contraction, Contraction::Dense);
}

#[test]
fn test_high_order_tensor_train_runs_factored() {
    let device = Default::default();
    // D = 129 and K = 6: the state tensor would hold 129^6 entries per example
    let config = ModelConfig::new(3, 3)
        .with_hidden_size(64)
        .with_uniform_rank(6, 4);
    assert!(config.validate().is_ok());

    let model = TensorRnnModel::<Backend>::new(&config, &device).unwrap();
    let inputs = Tensor::<Backend, 3>::ones([1, 2, 3], &device);
    let window = model.zero_window(1, &device).unwrap();
    let (predictions, _) = model.forward(inputs, window).unwrap();
    assert_eq!(predictions.dims(), [1, 2, 3]);
}

#[test]
fn test_high_order_dense_contraction_fails_at_build_time() {
    let device = Default::default();
    let config = ModelConfig::new(3, 3)
        .with_hidden_size(64)
        .with_uniform_rank(6, 4)
        .with_contraction(Contraction::Dense);
    assert!(matches!(config.validate(), Err(TensorRnnError::Config(_))));
    assert!(matches!(
        TensorRnnModel::<Backend>::new(&config, &device),
        Err(TensorRnnError::Config(_))
    ));
}

#[test]
fn test_order_rank_mismatch_fails_at_build_time() {
    let device = Default::default();
    let config = ModelConfig::new(2, 2).with_num_orders(3);
    assert!(matches!(
        TensorRnnModel::<Backend>::new(&config, &device),
        Err(TensorRnnError::Config(_))
    ));
}

#[test]
fn test_zero_rank_fails_at_build_time() {
    let device = Default::default();
    let config = ModelConfig::new(2, 2).with_rank_vals(vec![0]);
    assert!(matches!(
        CellStack::<Backend>::from_config(&config, &device),
        Err(TensorRnnError::Config(_))
    ));
}

#[test]
fn test_every_cell_kind_builds() {
    let device = Default::default();
    for cell in [CellKind::Matrix, CellKind::TensorTrain, CellKind::FullTensor] {
        let config = ModelConfig::new(1, 1)
            .with_hidden_size(3)
            .with_num_layers(2)
            .with_cell(cell);
        let stack = CellStack::<Backend>::from_config(&config, &device).unwrap();
        assert_eq!(stack.num_layers(), 2);
        assert!(stack.layers().iter().all(|layer| layer.kind() == cell));
    }
}
