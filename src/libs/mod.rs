pub mod cscore;
pub mod error;
pub mod family;
pub mod genes;
pub mod grouper;
pub mod io;
pub mod kdtree;
pub mod linkage;
pub mod params;
pub mod score;
