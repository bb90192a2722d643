use rules_domain::entity::Entity;
use rules_macros::entity;
use std::fmt;

#[entity(name = "staff.team", debug = false)]
struct Team {
    name: String,
}

impl fmt::Debug for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.id)
    }
}

// 已声明的 id 字段保留原有可见性，并被移到最前
#[entity(id = u32)]
struct Loan {
    item: String,
    pub id: u32,
}

fn main() {
    let t = Team::new("t-1".to_string());
    assert_eq!(Team::TYPE, "staff.team");
    assert_eq!(format!("{t:?}"), "Team(t-1)");
    assert!(t.name.is_empty());

    let loan = Loan::new(3);
    assert_eq!(loan.id, 3);
    assert!(loan.item.is_empty());
}
