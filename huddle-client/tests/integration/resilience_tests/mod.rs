mod test_leave_and_revocation;
mod test_transient_failures;
