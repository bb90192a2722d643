use rules_domain::entity::Entity;
use rules_macros::entity;

#[entity(id = u64)]
struct Employee {
    first_name: String,
}

fn main() {
    let mut e = Employee::new(5);
    e.first_name = "Jane".into();
    assert_eq!(e.id(), &5);
    assert_eq!(Employee::TYPE, "Employee");
    let json = serde_json::to_string(&e.clone()).unwrap();
    assert_eq!(json, r#"{"id":5,"first_name":"Jane"}"#);
    let _ = format!("{e:?}");
}
