//! Numerical primitives implemented from first principles.

pub mod descriptive;
pub mod linalg;
pub mod special;

pub use descriptive::{
    iqr_bounds, mean, median, quantile, sorted, std_dev, sum_of_squares, variance,
};
pub use linalg::{
    identity, invert_matrix, multiply, multiply_vec, regularized_inverse,
    regularized_inverse_with, transpose, Matrix,
};
pub use special::{
    chi_square_p_value, f_dist_p_value, incomplete_beta, incomplete_gamma, log_gamma, normal_inv,
    student_t_cdf, student_t_inv, student_t_two_sided,
};
