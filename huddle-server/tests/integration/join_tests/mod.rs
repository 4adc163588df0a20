mod test_join_issues_identity;
mod test_malformed_requests;
