mod test_malformed_signal_is_isolated;
