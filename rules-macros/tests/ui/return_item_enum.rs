use rules_application::outcome::{Extract, ReturnItem, ReturnItems};
use rules_macros::ReturnItem;
use std::any::TypeId;

#[derive(Debug, Clone, PartialEq)]
struct Employee {
    name: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Team(u32);

#[derive(Debug, Clone, PartialEq, ReturnItem)]
enum StaffResult {
    Employee(Employee),
    Team(Team),
}

fn main() {
    let r = StaffResult::from(Team(4));
    assert_eq!(r.slot(), TypeId::of::<Team>());
    assert!(r.type_name().ends_with("Team"));
    assert_eq!(Extract::<Team>::extract(&r), Some(&Team(4)));
    assert_eq!(Extract::<Employee>::extract(&r), None);

    let mut items = ReturnItems::new();
    items.insert(StaffResult::from(Employee { name: "Ann".into() }));
    items.insert(r);
    assert_eq!(items.get::<Employee>().map(|e| e.name.as_str()), Some("Ann"));
    assert_eq!(items.take::<Team>(), Some(Team(4)));
}
