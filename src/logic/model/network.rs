//! Small dense regressor shared by both model collaborators.
//!
//! One tanh hidden layer and a linear output, fitted on mean squared error
//! with Adam. Weights are initialized from a seeded `StdRng` so runs are
//! reproducible.

use ndarray::{Array, Array1, Array2, Axis, Dimension, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::logic::error::ModelError;

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;

// ============================================================================
// LAYER
// ============================================================================

#[derive(Debug, Clone)]
struct Dense {
    weights: Array2<f64>, // out x in
    bias: Array1<f64>,
    m_weights: Array2<f64>,
    v_weights: Array2<f64>,
    m_bias: Array1<f64>,
    v_bias: Array1<f64>,
}

impl Dense {
    fn new(rng: &mut StdRng, inputs: usize, outputs: usize) -> Self {
        let bound = 1.0 / (inputs as f64).sqrt();
        let weights = Array2::from_shape_fn((outputs, inputs), |_| rng.gen_range(-bound..bound));
        let bias = Array1::from_shape_fn(outputs, |_| rng.gen_range(-bound..bound));

        Self {
            m_weights: Array2::zeros(weights.raw_dim()),
            v_weights: Array2::zeros(weights.raw_dim()),
            m_bias: Array1::zeros(outputs),
            v_bias: Array1::zeros(outputs),
            weights,
            bias,
        }
    }

    /// `x W^T + b` for a batch of row vectors
    fn affine(&self, inputs: &Array2<f64>) -> Array2<f64> {
        inputs.dot(&self.weights.t()) + &self.bias
    }

    fn apply(&mut self, grad_weights: &Array2<f64>, grad_bias: &Array1<f64>, lr: f64, step: u64) {
        adam_step(&mut self.weights, grad_weights, &mut self.m_weights, &mut self.v_weights, lr, step);
        adam_step(&mut self.bias, grad_bias, &mut self.m_bias, &mut self.v_bias, lr, step);
    }
}

fn adam_step<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    lr: f64,
    step: u64,
) {
    m.zip_mut_with(grad, |m, &g| *m = BETA1 * *m + (1.0 - BETA1) * g);
    v.zip_mut_with(grad, |v, &g| *v = BETA2 * *v + (1.0 - BETA2) * g * g);

    let correction1 = 1.0 - BETA1.powf(step as f64);
    let correction2 = 1.0 - BETA2.powf(step as f64);

    Zip::from(param).and(&*m).and(&*v).for_each(|p, &m, &v| {
        *p -= lr * (m / correction1) / ((v / correction2).sqrt() + EPSILON);
    });
}

// ============================================================================
// REGRESSOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct MlpRegressor {
    hidden: Dense,
    output: Dense,
    input_size: usize,
    output_size: usize,
    steps: u64,
}

impl MlpRegressor {
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            hidden: Dense::new(&mut rng, input_size, hidden_size),
            output: Dense::new(&mut rng, hidden_size, output_size),
            input_size,
            output_size,
            steps: 0,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    fn forward(&self, inputs: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
        let hidden = self.hidden.affine(inputs).mapv(f64::tanh);
        let output = self.output.affine(&hidden);
        (hidden, output)
    }

    /// Forward pass for a single input row
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>, ModelError> {
        if input.len() != self.input_size {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{} inputs", self.input_size),
                actual: format!("{} inputs", input.len()),
            });
        }

        let row = Array2::from_shape_vec((1, self.input_size), input.to_vec()).map_err(|e| {
            ModelError::ShapeMismatch { expected: format!("1x{}", self.input_size), actual: e.to_string() }
        })?;
        let (_, output) = self.forward(&row);

        let prediction = output.row(0).to_vec();
        if prediction.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("prediction"));
        }
        Ok(prediction)
    }

    /// Full-batch gradient steps on MSE. Returns the loss of the last epoch.
    pub fn fit(
        &mut self,
        inputs: &Array2<f64>,
        targets: &Array2<f64>,
        epochs: usize,
        learning_rate: f64,
    ) -> Result<f64, ModelError> {
        if inputs.ncols() != self.input_size
            || targets.ncols() != self.output_size
            || inputs.nrows() != targets.nrows()
        {
            return Err(ModelError::ShapeMismatch {
                expected: format!("Nx{} -> Nx{}", self.input_size, self.output_size),
                actual: format!(
                    "{}x{} -> {}x{}",
                    inputs.nrows(),
                    inputs.ncols(),
                    targets.nrows(),
                    targets.ncols()
                ),
            });
        }
        if inputs.nrows() == 0 {
            return Err(ModelError::InsufficientData { have: 0, need: 0 });
        }

        let scale = 2.0 / (inputs.nrows() * self.output_size) as f64;
        let mut loss = f64::NAN;

        for _ in 0..epochs {
            let (hidden, output) = self.forward(inputs);
            let diff = &output - targets;
            loss = diff.mapv(|d| d * d).mean().unwrap_or(0.0);

            let d_output = diff * scale;
            let grad_w2 = d_output.t().dot(&hidden);
            let grad_b2 = d_output.sum_axis(Axis(0));

            let d_hidden = d_output.dot(&self.output.weights) * hidden.mapv(|h| 1.0 - h * h);
            let grad_w1 = d_hidden.t().dot(inputs);
            let grad_b1 = d_hidden.sum_axis(Axis(0));

            self.steps += 1;
            self.output.apply(&grad_w2, &grad_b2, learning_rate, self.steps);
            self.hidden.apply(&grad_w1, &grad_b1, learning_rate, self.steps);
        }

        if epochs > 0 && !loss.is_finite() {
            return Err(ModelError::NonFinite("training"));
        }
        Ok(loss)
    }
}

/// Stack equally sized rows into a matrix
pub fn rows_to_array(rows: &[Vec<f64>], width: usize) -> Result<Array2<f64>, ModelError> {
    let mut data = Vec::with_capacity(rows.len() * width);
    for row in rows {
        if row.len() != width {
            return Err(ModelError::ShapeMismatch {
                expected: format!("rows of {}", width),
                actual: format!("row of {}", row.len()),
            });
        }
        data.extend_from_slice(row);
    }
    Array2::from_shape_vec((rows.len(), width), data).map_err(|e| ModelError::ShapeMismatch {
        expected: format!("{}x{}", rows.len(), width),
        actual: e.to_string(),
    })
}
