mod test_receiver_errors;
