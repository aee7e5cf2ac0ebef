pub type Backend = burn::backend::NdArray<f32>;
