use super::*;
use crate::manager::test_helpers::{
    create_test_manager, create_test_manager_with_delay, open_test_manager, wait_for_status,
    wait_until_settled,
};
use crate::types::{FileStatus, TaskId, TaskStatus};
use std::time::Duration;
