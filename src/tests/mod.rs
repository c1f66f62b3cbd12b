mod common;

mod message;
mod signup;
mod topics;
