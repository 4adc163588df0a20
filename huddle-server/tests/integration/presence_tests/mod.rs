mod test_leave;
mod test_liveness;
