mod common;

mod cone;
mod docs;
mod health;
mod object;
mod source;
mod stats;
