pub mod attendance_entry;
pub mod attendance_group;
pub mod class_group;
pub mod course;
pub mod student_profile;
pub mod teacher_profile;
pub mod unlock_request;
pub mod user;

pub use attendance_entry::Entity as AttendanceEntry;
pub use attendance_group::Entity as AttendanceGroup;
pub use class_group::Entity as ClassGroup;
pub use course::Entity as Course;
pub use student_profile::Entity as StudentProfile;
pub use teacher_profile::Entity as TeacherProfile;
pub use unlock_request::Entity as UnlockRequest;
pub use user::Entity as User;
