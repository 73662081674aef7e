mod hit_history_tests;
mod method_tests;
