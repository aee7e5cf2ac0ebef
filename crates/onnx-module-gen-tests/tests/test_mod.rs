mod backend;

mod gather;
mod max;
mod reduce_sum;
