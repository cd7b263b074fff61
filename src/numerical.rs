/// sampling expressions on the plotting grid
pub mod sampler;
