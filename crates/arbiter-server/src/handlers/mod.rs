pub mod cases;
pub mod decrypt;
pub mod session;
pub mod votes;
