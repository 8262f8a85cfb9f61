#![cfg(test)]

mod discovery;
mod mock;
