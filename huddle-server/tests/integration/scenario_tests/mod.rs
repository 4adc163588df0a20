mod test_standup_call;
