pub mod user;
pub mod vacation;

#[cfg(test)]
mod tests;
