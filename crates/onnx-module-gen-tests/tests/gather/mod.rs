use burn::tensor::{Device, Int, Tensor, TensorData};
use onnx_module_gen_tests::{
    embedding, embedding_fresh, gather_last_axis, gather_scalar, gather_scalar_vector,
    gather_select, gather_take,
};

use crate::backend::Backend;

fn data_3x2(device: &Device<Backend>) -> Tensor<Backend, 2> {
    Tensor::from_floats([[1., 2.], [3., 4.], [5., 6.]], device)
}

fn data_2x3(device: &Device<Backend>) -> Tensor<Backend, 2> {
    Tensor::from_floats([[1., 2., 3.], [4., 5., 6.]], device)
}

#[test]
fn gather_rows() {
    let device = Default::default();
    let model: gather_select::Model<Backend> = gather_select::Model::new(&device);

    let index = Tensor::<Backend, 1, Int>::from_ints([2, 0], &device);
    let output = model.forward(data_3x2(&device), index);

    let expected = TensorData::from([[5f32, 6.], [1., 2.]]);
    output.to_data().assert_eq(&expected, true);
}

#[test]
fn gather_on_the_last_axis() {
    let device = Default::default();
    let model: gather_last_axis::Model<Backend> = gather_last_axis::Model::new(&device);

    let index = Tensor::<Backend, 1, Int>::from_ints([2, 0], &device);
    let output = model.forward(data_2x3(&device), index);

    let expected = TensorData::from([[3f32, 1.], [6., 4.]]);
    output.to_data().assert_eq(&expected, true);
}

#[test]
fn gather_with_a_matrix_of_indices() {
    let device = Default::default();
    let model: gather_take::Model<Backend> = gather_take::Model::new(&device);

    let index = Tensor::<Backend, 2, Int>::from_ints([[0, 1], [2, 2]], &device);
    let output = model.forward(data_3x2(&device), index);

    let expected = TensorData::from([[[1f32, 2.], [3., 4.]], [[5., 6.], [5., 6.]]]);
    output.to_data().assert_eq(&expected, true);
}

#[test]
fn gather_a_row_with_a_scalar_index() {
    let device = Default::default();
    let model: gather_scalar::Model<Backend> = gather_scalar::Model::new(&device);

    let index = Tensor::<Backend, 1, Int>::from_ints([1], &device);
    let output = model.forward(data_2x3(&device), index);

    let expected = TensorData::from([4f32, 5., 6.]);
    output.to_data().assert_eq(&expected, true);
}

#[test]
fn gather_an_element_with_a_scalar_index() {
    let device = Default::default();
    let model: gather_scalar_vector::Model<Backend> = gather_scalar_vector::Model::new(&device);

    let shape = Tensor::<Backend, 1, Int>::from_ints([10, 20, 30], &device);
    let index = Tensor::<Backend, 1, Int>::from_ints([2], &device);
    let output = model.forward(shape, index);

    let expected = TensorData::from([30i64]);
    output.to_data().assert_eq(&expected, true);
}

#[test]
fn embedding_with_the_graph_weights() {
    let device = Default::default();
    let model: embedding::Model<Backend> = embedding::Model::new(&device);

    let ids = Tensor::<Backend, 2, Int>::from_ints([[0, 3, 1], [2, 2, 0]], &device);
    let output = model.forward(ids);

    let expected = TensorData::from([
        [[0f32, 1.], [6., 7.], [2., 3.]],
        [[4., 5.], [4., 5.], [0., 1.]],
    ]);
    output.to_data().assert_eq(&expected, true);
}

#[test]
fn embedding_with_a_fresh_table() {
    let device = Default::default();
    let model: embedding_fresh::Model<Backend> = embedding_fresh::Model::new(&device);

    let ids = Tensor::<Backend, 2, Int>::from_ints([[0, 9, 1], [2, 7, 0]], &device);
    let output = model.forward(ids);

    assert_eq!(output.dims(), [2, 3, 2]);
}
