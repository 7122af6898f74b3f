#[cfg(test)]
mod learning_tests;
#[cfg(test)]
mod tiles_tests;
