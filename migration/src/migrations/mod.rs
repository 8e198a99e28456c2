pub mod m202606100001_create_users;
pub mod m202606100002_create_class_groups;
pub mod m202606100003_create_profiles;
pub mod m202606100004_create_courses;
pub mod m202606150001_create_attendance;
pub mod m202606150002_create_unlock_requests;
