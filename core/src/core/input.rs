/// Describes a single input button exposed by a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputButton {
    pub id: u8,
    pub name: &'static str,
}
