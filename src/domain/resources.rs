//! URI-addressed read-only resources
//!
//! Exposes the greeting template, its static `test` variant, and a fixed
//! employee directory under `employees://details`.

use serde::Serialize;
use serde_json::json;

use crate::dispatch::Arguments;
use crate::errors::AppError;
use crate::output::HandlerOutput;
use crate::registry::{Handler, ParamKind, ParamSpec};

pub const GREETING_TEMPLATE_URI: &str = "greeting://{name}";
pub const GREETING_TEST_URI: &str = "greeting://test";
pub const EMPLOYEES_RESOURCE_URI: &str = "employees://details";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Employee {
    pub id: u32,
    pub name: &'static str,
    pub role: &'static str,
    pub department: &'static str,
    pub email: &'static str,
    pub location: &'static str,
}

const fn employee(
    id: u32,
    name: &'static str,
    role: &'static str,
    department: &'static str,
    email: &'static str,
    location: &'static str,
) -> Employee {
    Employee {
        id,
        name,
        role,
        department,
        email,
        location,
    }
}

pub const EMPLOYEES: [Employee; 10] = [
    employee(101, "Alice Johnson", "Software Engineer", "Engineering", "alice.johnson@example.com", "New York"),
    employee(102, "Bob Smith", "QA Engineer", "Quality Assurance", "bob.smith@example.com", "San Francisco"),
    employee(103, "Charlie Brown", "Product Manager", "Product", "charlie.brown@example.com", "London"),
    employee(104, "Diana Prince", "DevOps Engineer", "Infrastructure", "diana.prince@example.com", "Berlin"),
    employee(105, "Ethan Hunt", "Security Analyst", "Cybersecurity", "ethan.hunt@example.com", "Singapore"),
    employee(106, "Fiona Gallagher", "Data Scientist", "Data Analytics", "fiona.gallagher@example.com", "Toronto"),
    employee(107, "George Miller", "UI/UX Designer", "Design", "george.miller@example.com", "Sydney"),
    employee(108, "Hannah Lee", "Frontend Developer", "Engineering", "hannah.lee@example.com", "Tokyo"),
    employee(109, "Ian Wright", "Backend Developer", "Engineering", "ian.wright@example.com", "Dublin"),
    employee(110, "Julia Roberts", "HR Manager", "Human Resources", "julia.roberts@example.com", "Amsterdam"),
];

pub fn catalog() -> Vec<Handler> {
    vec![
        Handler::resource(
            GREETING_TEMPLATE_URI,
            "get_greeting",
            "Get a personalized greeting",
            get_greeting,
        )
        .param(ParamSpec::required("name", ParamKind::Text))
        .mime_type("text/plain"),
        Handler::resource(
            GREETING_TEST_URI,
            "get_greeting_test",
            "Static greeting",
            get_greeting_test,
        )
        .mime_type("text/plain"),
        Handler::resource(
            EMPLOYEES_RESOURCE_URI,
            "get_employee_details",
            "Get a list of sample employee details",
            get_employee_details,
        )
        .mime_type("application/json"),
    ]
}

pub fn greeting(name: &str) -> String {
    format!("Hello, {name}!")
}

pub fn get_greeting(args: &Arguments) -> Result<HandlerOutput, AppError> {
    Ok(HandlerOutput::Text(greeting(args.text("name")?)))
}

pub fn get_greeting_test(_args: &Arguments) -> Result<HandlerOutput, AppError> {
    Ok(HandlerOutput::Text(greeting("test")))
}

pub fn get_employee_details(_args: &Arguments) -> Result<HandlerOutput, AppError> {
    Ok(HandlerOutput::Structured(json!({ "employees": EMPLOYEES })))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn greeting_round_trips_through_embedded_name() {
        for name in ["Ada", "test", "O'Brien"] {
            let text = greeting(name);
            let embedded = text
                .strip_prefix("Hello, ")
                .and_then(|rest| rest.strip_suffix('!'))
                .expect("greeting shape");
            assert_eq!(greeting(embedded), text);
        }
    }

    #[test]
    fn static_greeting_is_idempotent() {
        for _ in 0..3 {
            let output = get_greeting_test(&Arguments::default()).expect("greeting");
            assert!(matches!(output, HandlerOutput::Text(ref text) if text == "Hello, test!"));
        }
    }

    #[test]
    fn employee_directory_has_ten_complete_unique_records() {
        let ids: HashSet<u32> = EMPLOYEES.iter().map(|employee| employee.id).collect();
        assert_eq!(ids, (101..=110).collect::<HashSet<u32>>());

        for employee in EMPLOYEES {
            for field in [
                employee.name,
                employee.role,
                employee.department,
                employee.email,
                employee.location,
            ] {
                assert!(!field.is_empty(), "employee {} has an empty field", employee.id);
            }
        }
    }

    #[test]
    fn employee_details_preserves_order() {
        let HandlerOutput::Structured(value) =
            get_employee_details(&Arguments::default()).expect("details")
        else {
            panic!("expected structured output");
        };

        let employees = value["employees"].as_array().expect("employees array");
        assert_eq!(employees.len(), 10);
        assert_eq!(employees[0]["id"], 101);
        assert_eq!(employees[0]["name"], "Alice Johnson");
        assert_eq!(employees[9]["id"], 110);
        assert_eq!(employees[9]["location"], "Amsterdam");
    }
}
