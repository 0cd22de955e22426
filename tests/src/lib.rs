#[cfg(test)]
mod attribution;
