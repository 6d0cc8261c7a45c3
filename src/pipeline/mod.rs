pub mod context;
pub mod encoding;
pub mod labels;
pub mod mappings;
pub mod model;
pub mod recommend;

#[cfg(test)]
pub(crate) mod testdata;
