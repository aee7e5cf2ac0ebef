use burn::tensor::{Device, Tensor, TensorData};
use onnx_module_gen_tests::{reduce_sum_all, reduce_sum_keepdims, reduce_sum_squeeze};

use crate::backend::Backend;

fn input(device: &Device<Backend>) -> Tensor<Backend, 3> {
    Tensor::from_floats([[[1., 2.], [3., 4.]], [[5., 6.], [7., 8.]]], device)
}

#[test]
fn reduce_sum_keeping_dims() {
    let device = Default::default();
    let model: reduce_sum_keepdims::Model<Backend> = reduce_sum_keepdims::Model::new(&device);

    let output = model.forward(input(&device));

    let expected = TensorData::from([[[4f32, 6.]], [[12., 14.]]]);
    output.to_data().assert_eq(&expected, true);
}

#[test]
fn reduce_sum_dropping_dims() {
    let device = Default::default();
    let model: reduce_sum_squeeze::Model<Backend> = reduce_sum_squeeze::Model::new(&device);

    let output = model.forward(input(&device));

    let expected = TensorData::from([14f32, 22.]);
    output.to_data().assert_eq(&expected, true);
}

#[test]
fn reduce_sum_of_all_elements() {
    let device = Default::default();
    let model: reduce_sum_all::Model<Backend> = reduce_sum_all::Model::new(&device);

    let output = model.forward(input(&device));

    let expected = TensorData::from([36f32]);
    output.to_data().assert_eq(&expected, true);
}
