//! Walks through PCA, SVD and QR on small matrices.

use numkit::{Matrix, Pca, Qr, Svd};

fn main() -> numkit::Result<()> {
    // --- PCA on strongly correlated 3D data ---------------------------------
    let data = Matrix::new(vec![
        vec![2.5, 2.4, 0.5],
        vec![0.5, 0.7, 1.1],
        vec![2.2, 2.9, 0.3],
        vec![1.9, 2.2, 1.4],
        vec![3.1, 3.0, 0.1],
        vec![2.3, 2.7, 0.8],
        vec![2.0, 1.6, 0.9],
        vec![1.0, 1.1, 1.2],
    ])?;

    let mut pca = Pca::new().n_components(2).random_state(42);
    let scores = pca.fit_transform(&data)?;
    println!("PCA scores shape: {:?}", scores.shape());
    println!(
        "explained variance ratio: {:?}",
        pca.explained_variance_ratio().unwrap()
    );

    // --- SVD: low-rank reconstruction ---------------------------------------
    let a = Matrix::new(vec![
        vec![2.0, 0.0, 1.0],
        vec![0.0, 3.0, 0.0],
        vec![1.0, 0.0, 2.0],
    ])?;
    let svd = Svd::decompose_seeded(&a, 300, 1e-12, 7)?;
    println!("singular values: {:?}", svd.singular_values());
    println!("condition number: {:.4}", svd.condition_number());
    println!("numerical rank: {}", svd.numerical_rank(1e-12));

    let rank2 = svd.reconstruct(Some(2))?;
    let error = a.subtract(&rank2)?;
    let worst = error
        .as_array()
        .iter()
        .fold(0.0_f64, |acc, e| acc.max(e.abs()));
    println!("rank-2 reconstruction max error: {worst:.6}");

    // --- QR: solve a linear system ------------------------------------------
    let system = Matrix::new(vec![vec![3.0, 1.0], vec![1.0, 2.0]])?;
    let rhs = Matrix::new(vec![vec![9.0], vec![8.0]])?;
    let qr = Qr::decompose(&system)?;
    let solution = qr.solve(&rhs)?;
    println!(
        "solution: x = {:.4}, y = {:.4}",
        solution.get(0, 0)?,
        solution.get(1, 0)?
    );
    println!("rank: {}, |det|: {:.4}", qr.rank(1e-12), qr.determinant().abs());

    Ok(())
}
