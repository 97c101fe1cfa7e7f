#[cfg(test)]
mod compiling;
