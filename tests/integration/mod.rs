mod universe_integration;
