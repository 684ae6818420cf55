pub mod change_manual;
pub mod change_options;
pub mod change_password;
pub mod change_program;
pub mod change_program_index;
pub mod change_run_once;
pub mod change_settings;
pub mod change_stations;
pub mod delete_log;
pub mod delete_program;
pub mod json_all;
pub mod json_log;
pub mod json_options;
pub mod json_programs;
pub mod json_settings;
pub mod json_stations;
pub mod json_stations_special;
pub mod json_status;
pub mod manual_program;
pub mod pause_queue;
