//! Trains the linear-regression reference model on a noisy line with each of
//! the three gradient-descent methods and prints the recovered parameters.

use numkit::{GradientDescent, LinearRegression, Matrix, MeanSquaredError, Method, OptimizableModel};

fn main() -> numkit::Result<()> {
    // y = 2x + 1 with a little noise
    let x = Matrix::new(vec![
        vec![0.0],
        vec![1.0],
        vec![2.0],
        vec![3.0],
        vec![4.0],
        vec![5.0],
    ])?;
    let y = Matrix::new(vec![
        vec![1.05],
        vec![2.98],
        vec![5.02],
        vec![6.97],
        vec![9.01],
        vec![11.0],
    ])?;

    for (name, method) in [
        ("sgd", Method::Sgd),
        ("momentum", Method::Momentum),
        ("adam", Method::Adam),
    ] {
        let mut model = LinearRegression::seeded(1, 1, 42)?;
        let optimizer = GradientDescent::new(0.02, 20_000, 1e-12, method);
        let outcome = optimizer.optimize(&mut model, &x, &y, &MeanSquaredError)?;

        println!("=== {name} ===");
        println!(
            "  converged: {} after {} iterations",
            outcome.converged, outcome.iterations
        );
        println!(
            "  weight: {:.4}, bias: {:.4}",
            model.weights().get(0, 0)?,
            model.bias().get(0, 0)?
        );
        println!("  final loss: {:.6}", outcome.losses.last().unwrap());

        let predictions = model.predict(&x)?;
        println!(
            "  prediction at x=5: {:.3} (target 11.0)",
            predictions.get(5, 0)?
        );
        println!();
    }

    Ok(())
}
