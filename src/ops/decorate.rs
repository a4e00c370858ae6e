use crate::model::entity::EntityType;

/// Short visual prefix for a type tag. Unknown tags get none.
pub fn decoration(entity_type: &EntityType) -> &'static str {
    match entity_type.as_str() {
        EntityType::PROGRAM => "🚀 ",
        EntityType::PROJECT => "📁 ",
        EntityType::MILESTONE => "🔷 ",
        EntityType::TASK => "✅ ",
        _ => "",
    }
}

/// Display label: decoration followed by the plain name.
pub fn decorated_name(entity_type: &EntityType, name: &str) -> String {
    format!("{}{}", decoration(entity_type), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_types() {
        assert_eq!(decoration(&EntityType::new("program")), "🚀 ");
        assert_eq!(decoration(&EntityType::new("project")), "📁 ");
        assert_eq!(decoration(&EntityType::new("milestone")), "🔷 ");
        assert_eq!(decoration(&EntityType::new("Task")), "✅ ");
    }

    #[test]
    fn test_unknown_type_has_no_decoration() {
        assert_eq!(decoration(&EntityType::new("risk")), "");
        assert_eq!(decoration(&EntityType::default()), "");
        assert_eq!(decorated_name(&EntityType::new("risk"), "Vendor slip"), "Vendor slip");
    }

    #[test]
    fn test_decorated_name() {
        assert_eq!(
            decorated_name(&EntityType::new("milestone"), "Beta"),
            "🔷 Beta"
        );
    }
}
