pub mod parley_env;
