use burn::tensor::{Tensor, TensorData};
use onnx_module_gen_tests::max;

use crate::backend::Backend;

#[test]
fn max_of_all_elements() {
    let device = Default::default();
    let model: max::Model<Backend> = max::Model::new(&device);

    let input = Tensor::<Backend, 2>::from_floats([[1., 7., 3.], [4., 5., 6.]], &device);
    let output = model.forward(input);

    let expected = TensorData::from([7f32]);
    output.to_data().assert_eq(&expected, true);
}
