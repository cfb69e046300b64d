pub mod bounds;
pub mod options;
pub mod point;
pub mod vector3;
