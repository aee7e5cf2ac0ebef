//! Burn modules generated by the build script from single node ONNX graphs.

macro_rules! include_models {
    ($($model:ident),* $(,)?) => {
        $(
            pub mod $model {
                include!(concat!(env!("OUT_DIR"), "/model/", stringify!($model), ".rs"));
            }
        )*
    };
}

include_models!(
    embedding,
    embedding_fresh,
    gather_last_axis,
    gather_scalar,
    gather_scalar_vector,
    gather_select,
    gather_take,
    max,
    reduce_sum_all,
    reduce_sum_keepdims,
    reduce_sum_squeeze,
);
