pub mod appointment;
pub mod business;
pub mod customer;
pub mod employee;
pub mod exception;
pub mod hours;
pub mod service;
pub mod slot;

pub use appointment::{
    Appointment, AppointmentStatus, BookingSource, CreateAppointment, Reschedule,
    SimpleAppointment,
};
pub use business::Business;
pub use customer::{Customer, CustomerData};
pub use employee::{Employee, EmployeeRef};
pub use exception::{ExceptionCheck, ExceptionType, NewException, ScheduleException};
pub use hours::{ConfigurationError, DayHours, DayWindow, WeeklyHours};
pub use service::{Service, ServiceTiming};
pub use slot::{Interval, TimeSlot, WorkingBlock};
