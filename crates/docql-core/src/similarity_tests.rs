//! Tests for `similarity` module

use super::similarity::*;

#[test]
fn test_cosine_score() {
    let a = [1.0, 0.0, 0.0];

    assert!((SimilarityFunction::Cosine.score(&a, &[2.0, 0.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!((SimilarityFunction::Cosine.score(&a, &[0.0, 1.0, 0.0]) - 0.5).abs() < 1e-6);
    assert!(SimilarityFunction::Cosine.score(&a, &[-1.0, 0.0, 0.0]).abs() < 1e-6);
}

#[test]
fn test_cosine_zero_vector_scores_zero() {
    assert!(SimilarityFunction::Cosine.score(&[0.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
}

#[test]
fn test_euclidean_score() {
    let score = SimilarityFunction::Euclidean.score(&[0.0, 0.0], &[3.0, 4.0]);
    assert!((score - 1.0 / 26.0).abs() < 1e-6);

    let same = SimilarityFunction::Euclidean.score(&[1.0, 2.0], &[1.0, 2.0]);
    assert!((same - 1.0).abs() < 1e-6);
}

#[test]
fn test_dot_product_score() {
    let score = SimilarityFunction::DotProduct.score(&[0.6, 0.8], &[0.6, 0.8]);
    assert!((score - 1.0).abs() < 1e-6);
}

#[test]
fn test_length_mismatch_scores_zero() {
    for function in [
        SimilarityFunction::Cosine,
        SimilarityFunction::Euclidean,
        SimilarityFunction::DotProduct,
    ] {
        assert!(function.score(&[1.0, 2.0], &[1.0]).abs() < f32::EPSILON);
        assert!(function.score(&[], &[]).abs() < f32::EPSILON);
    }
}

#[test]
fn test_as_option() {
    assert_eq!(SimilarityFunction::Cosine.as_option(), "cosine");
    assert_eq!(SimilarityFunction::Euclidean.as_option(), "euclidean");
    assert_eq!(SimilarityFunction::DotProduct.as_option(), "dot_product");
}

#[test]
fn test_sort_results_best_first() {
    // Arrange
    let mut results = vec![("far", 0.1), ("near", 0.9), ("mid", 0.5)];

    // Act
    SimilarityFunction::Cosine.sort_results(&mut results);

    // Assert
    let order: Vec<&str> = results.iter().map(|(k, _)| *k).collect();
    assert_eq!(order, vec!["near", "mid", "far"]);
}

#[test]
fn test_serde_names() {
    let json = serde_json::to_string(&SimilarityFunction::DotProduct).unwrap();
    assert_eq!(json, "\"dot_product\"");

    let parsed: SimilarityFunction = serde_json::from_str("\"euclidean\"").unwrap();
    assert_eq!(parsed, SimilarityFunction::Euclidean);
    assert_eq!(SimilarityFunction::default(), SimilarityFunction::Cosine);
}
