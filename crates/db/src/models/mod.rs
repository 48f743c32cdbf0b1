pub mod chat_message;
pub mod task;

#[cfg(test)]
pub(crate) mod test_utils;
