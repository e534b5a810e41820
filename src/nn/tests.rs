#[cfg(test)]
mod tests {
    use crate::nn::activations::{Activation, Swish};
    use crate::nn::layers::*;
    use crate::nn::module::{Mode, Module};
    use crate::nn::parameter::Parameter;
    use crate::tensor::Tensor;
    use approx::assert_relative_eq;

    // ============================================================================
    // CONV2D LAYER TESTS
    // ============================================================================

    #[test]
    fn conv2d_output_dimensions() {
        let test_cases = vec![
            // (in_c, out_c, kernel, stride, padding, in_hw, expected_hw)
            (3, 64, 7, 2, 3, 224, 112), // stem convolution
            (64, 192, 3, 1, 1, 56, 56), // second stem convolution
            (192, 64, 1, 1, 0, 28, 28), // 1x1 projection
        ];

        for (in_c, out_c, k, s, p, in_hw, expected_hw) in test_cases {
            let layer = Conv2d::<f32>::new(in_c, out_c, (k, k), (s, s), (p, p), false);
            let input = Tensor::ones(&[2, in_c, in_hw, in_hw]);

            let output = layer.forward(&input, Mode::Eval).unwrap();
            assert_eq!(
                output.shape(),
                &[2, out_c, expected_hw, expected_hw],
                "failed for conv {in_c}->{out_c} k={k} s={s} p={p}"
            );
            assert_eq!(
                layer.output_shape(input.shape()).unwrap(),
                output.shape().to_vec()
            );
        }
    }

    #[test]
    fn conv2d_mathematical_correctness() {
        // All-ones 2x2 kernel over a known input: outputs are window sums.
        let mut layer = Conv2d::<f64>::new(1, 1, (2, 2), (1, 1), (0, 0), false);
        layer.weight = Parameter::from_init(&[1, 1, 2, 2], || 1.0);

        let input =
            Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0], &[1, 1, 3, 3])
                .unwrap();
        let output = layer.forward(&input, Mode::Eval).unwrap();

        let expected = [12.0, 16.0, 24.0, 28.0];
        for (got, want) in output.data().iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn conv2d_bias_is_added_per_channel() {
        let mut layer = Conv2d::<f64>::new(1, 2, (1, 1), (1, 1), (0, 0), true);
        layer.weight = Parameter::from_init(&[2, 1, 1, 1], || 0.0);
        layer.bias = Some(Parameter::new(
            Tensor::from_vec(vec![1.5, -2.5], &[2]).unwrap(),
        ));

        let output = layer
            .forward(&Tensor::ones(&[1, 1, 2, 2]), Mode::Eval)
            .unwrap();
        assert_relative_eq!(output.data()[[0, 0, 0, 0]], 1.5);
        assert_relative_eq!(output.data()[[0, 1, 1, 1]], -2.5);
    }

    #[test]
    fn conv2d_rejects_wrong_channel_count() {
        let layer = Conv2d::<f32>::new(3, 8, (3, 3), (1, 1), (1, 1), false);
        let input = Tensor::ones(&[1, 5, 8, 8]);
        assert!(layer.forward(&input, Mode::Eval).is_err());
    }

    // ============================================================================
    // BATCH NORM TESTS
    // ============================================================================

    #[test]
    fn batchnorm_training_standardizes_batch() {
        let bn = BatchNorm2d::<f64>::new(2);

        // Channel 0 holds [1, 3] across the batch, channel 1 holds [5, 5].
        let input = Tensor::from_vec(vec![1.0, 5.0, 3.0, 5.0], &[2, 2, 1, 1]).unwrap();
        let output = bn.forward(&input, Mode::Train).unwrap();

        // mean=2, var=1 -> standardized to about -1 and +1.
        assert_relative_eq!(output.data()[[0, 0, 0, 0]], -1.0, epsilon = 1e-4);
        assert_relative_eq!(output.data()[[1, 0, 0, 0]], 1.0, epsilon = 1e-4);
        // Constant channel standardizes to zero.
        assert_relative_eq!(output.data()[[0, 1, 0, 0]], 0.0, epsilon = 1e-4);
    }

    #[test]
    fn batchnorm_training_updates_running_stats() {
        let bn = BatchNorm2d::<f64>::new(1);
        let input = Tensor::from_vec(vec![1.0, 3.0], &[2, 1, 1, 1]).unwrap();

        bn.forward(&input, Mode::Train).unwrap();

        // running = 0.9 * initial + 0.1 * batch, with batch mean 2 and var 1.
        assert_relative_eq!(bn.get_running_mean().data()[[0]], 0.2, epsilon = 1e-12);
        assert_relative_eq!(bn.get_running_var().data()[[0]], 1.0, epsilon = 1e-12);
        assert_eq!(bn.num_batches_tracked(), 1);
    }

    #[test]
    fn batchnorm_eval_uses_running_stats() {
        let bn = BatchNorm2d::<f64>::new(1);
        let input = Tensor::from_vec(vec![1.0, 3.0], &[2, 1, 1, 1]).unwrap();

        // With the initial running stats (mean 0, var 1) evaluation is nearly
        // the identity, and it must not touch the stored statistics.
        let output = bn.forward(&input, Mode::Eval).unwrap();
        assert_relative_eq!(output.data()[[0, 0, 0, 0]], 1.0, epsilon = 1e-4);
        assert_relative_eq!(output.data()[[1, 0, 0, 0]], 3.0, epsilon = 1e-4);
        assert_eq!(bn.num_batches_tracked(), 0);
    }

    #[test]
    fn batchnorm_applies_learned_scale_and_shift() {
        let mut bn = BatchNorm2d::<f64>::new(1);
        bn.weight = Parameter::new(Tensor::from_vec(vec![3.0], &[1]).unwrap());
        bn.bias = Parameter::new(Tensor::from_vec(vec![0.5], &[1]).unwrap());

        let input = Tensor::from_vec(vec![1.0, 3.0], &[2, 1, 1, 1]).unwrap();
        let output = bn.forward(&input, Mode::Train).unwrap();

        assert_relative_eq!(output.data()[[0, 0, 0, 0]], -2.5, epsilon = 1e-3);
        assert_relative_eq!(output.data()[[1, 0, 0, 0]], 3.5, epsilon = 1e-3);
    }

    #[test]
    fn batchnorm_rejects_feature_mismatch() {
        let bn = BatchNorm2d::<f32>::new(8);
        let input = Tensor::ones(&[2, 4, 2, 2]);
        assert!(bn.forward(&input, Mode::Train).is_err());
    }

    // ============================================================================
    // DROPOUT TESTS
    // ============================================================================

    #[test]
    fn dropout_is_identity_in_eval_mode() {
        let dropout = Dropout::new(0.7);
        let input = Tensor::<f32>::ones(&[4, 100]);
        let output = dropout.forward(&input, Mode::Eval).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn dropout_masks_and_rescales_in_training_mode() {
        let dropout = Dropout::new(0.5);
        let input = Tensor::<f64>::ones(&[100, 100]);
        let output = dropout.forward(&input, Mode::Train).unwrap();

        let mut zeros = 0usize;
        for &v in output.data().iter() {
            if v == 0.0 {
                zeros += 1;
            } else {
                // Survivors carry the inverted-dropout scale 1 / (1 - p).
                assert_relative_eq!(v, 2.0, epsilon = 1e-12);
            }
        }

        let dropped = zeros as f64 / input.size() as f64;
        assert!(
            (0.4..0.6).contains(&dropped),
            "dropped fraction {dropped} too far from p = 0.5"
        );
    }

    #[test]
    fn dropout_varies_between_training_passes() {
        let dropout = Dropout::new(0.5);
        let input = Tensor::<f64>::ones(&[64, 64]);
        let a = dropout.forward(&input, Mode::Train).unwrap();
        let b = dropout.forward(&input, Mode::Train).unwrap();
        assert_ne!(a, b);
    }

    // ============================================================================
    // LINEAR LAYER TESTS
    // ============================================================================

    #[test]
    fn linear_mathematical_correctness() {
        let mut linear = Linear::<f64>::new(2, 3, true);
        linear.weight = Parameter::from_init(&[3, 2], || 0.1);

        let input = Tensor::from_vec(vec![1.0, 2.0], &[1, 2]).unwrap();
        let output = linear.forward(&input, Mode::Eval).unwrap();

        assert_eq!(output.shape(), &[1, 3]);
        // [1, 2] @ [[0.1, 0.1], ...]^T = 0.3 for each output.
        for &v in output.data().iter() {
            assert_relative_eq!(v, 0.3, epsilon = 1e-12);
        }
    }

    #[test]
    fn linear_bias_broadcasts_over_batch() {
        let mut linear = Linear::<f64>::new(2, 2, true);
        linear.weight = Parameter::from_init(&[2, 2], || 0.0);
        linear.bias = Some(Parameter::new(
            Tensor::from_vec(vec![1.0, -1.0], &[2]).unwrap(),
        ));

        let input = Tensor::zeros(&[3, 2]);
        let output = linear.forward(&input, Mode::Eval).unwrap();
        for row in 0..3 {
            assert_relative_eq!(output.data()[[row, 0]], 1.0);
            assert_relative_eq!(output.data()[[row, 1]], -1.0);
        }
    }

    #[test]
    fn linear_rejects_feature_mismatch() {
        let linear = Linear::<f32>::new(10, 4, true);
        let input = Tensor::ones(&[2, 8]);
        assert!(linear.forward(&input, Mode::Eval).is_err());
    }

    // ============================================================================
    // POOLING LAYER TESTS
    // ============================================================================

    #[test]
    fn pooling_layer_shapes() {
        let input = Tensor::<f32>::ones(&[2, 16, 14, 14]);

        let maxpool = MaxPool2d::new(3, 2, 1);
        let pooled = maxpool.forward(&input, Mode::Eval).unwrap();
        assert_eq!(pooled.shape(), &[2, 16, 7, 7]);

        let avgpool = AvgPool2d::new(5, 3);
        let averaged = avgpool.forward(&input, Mode::Eval).unwrap();
        assert_eq!(averaged.shape(), &[2, 16, 4, 4]);
    }

    // ============================================================================
    // PARAMETER ACCOUNTING
    // ============================================================================

    #[test]
    fn parameter_collection_and_counts() {
        let conv = Conv2d::<f32>::new(3, 8, (3, 3), (1, 1), (1, 1), false);
        assert_eq!(conv.parameters().len(), 1);
        assert_eq!(conv.num_parameters(), 8 * 3 * 3 * 3);

        let bn = BatchNorm2d::<f32>::new(8);
        assert_eq!(bn.parameters().len(), 2);
        assert_eq!(bn.num_parameters(), 16);

        let linear = Linear::<f32>::new(16, 4, true);
        assert_eq!(linear.parameters().len(), 2);
        assert_eq!(linear.num_parameters(), 16 * 4 + 4);

        let maxpool = MaxPool2d::new(2, 2, 0);
        assert_eq!(Module::<f32>::parameters(&maxpool).len(), 0);
    }

    #[test]
    fn swish_composes_with_layers() {
        let conv = Conv2d::<f32>::new(3, 4, (1, 1), (1, 1), (0, 0), false);
        let input = Tensor::ones(&[1, 3, 2, 2]);
        let convolved = conv.forward(&input, Mode::Eval).unwrap();
        let activated = Swish.apply(&convolved);
        assert_eq!(activated.shape(), convolved.shape());
    }
}
