pub mod composite;
pub mod gradient;
pub mod spectral;
pub mod warping;
