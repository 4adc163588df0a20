mod test_post_validation;
mod test_seq_and_cursor;
