use lpapi::group::{
    initializer, KindValidator, NameGenerator, NumberRangeValidator, PrefixKind,
    PrefixNameGenerator, SetContainmentValidator,
};
use lpapi::{
    prefixes, LifecyclePhase, Model, ModelError, ModelState, NameError, ObjectiveType, Operator,
    SkeletonBackend, VarType,
};
use std::collections::BTreeMap;
use std::sync::Arc;

const VARS: [&str; 3] = ["X", "Y", "Z"];
const EQUATIONS: i64 = 2;

/// C-/-<var>-/-<equation>: coefficient of a variable in an equation
fn coefficient_names() -> Arc<dyn NameGenerator> {
    let generator = PrefixNameGenerator::new("C", 2)
        .with_validator(KindValidator::new(0, PrefixKind::Text))
        .and_then(|g| g.with_validator(SetContainmentValidator::new(0, VARS)))
        .and_then(|g| g.with_validator(KindValidator::new(1, PrefixKind::Int)))
        .and_then(|g| g.with_validator(NumberRangeValidator::new(1, 1.0, EQUATIONS as f64)))
        .unwrap();
    Arc::new(generator)
}

/// Cout-/-<equation>: right-hand side of an equation
fn rhs_names() -> Arc<dyn NameGenerator> {
    Arc::new(
        PrefixNameGenerator::new("Cout", 1)
            .with_validator(NumberRangeValidator::new(0, 1.0, EQUATIONS as f64))
            .unwrap(),
    )
}

fn equation_names() -> Arc<dyn NameGenerator> {
    Arc::new(
        PrefixNameGenerator::new("Constraint", 1)
            .with_validator(NumberRangeValidator::new(0, 1.0, EQUATIONS as f64))
            .unwrap(),
    )
}

/// Three boolean variables, each in its own group, two equations whose
/// coefficients live in constant groups, and a generated objective.
fn build() -> Model<SkeletonBackend> {
    let model = Model::new("test", SkeletonBackend::new());

    for var in VARS {
        model
            .create_var_group_with(
                var,
                &format!("{} variable group", var),
                None,
                Some(initializer(move |ctx| {
                    ctx.model()
                        .create_var_in(var, VarType::Boolean, 0.0, 1.0, ctx.group())?;
                    Ok(())
                })),
            )
            .unwrap();
    }

    let coefficients = coefficient_names();
    model
        .create_constant_group_with(
            "ConstantPrefix",
            "Coefficients of the variables in each equation",
            Some(coefficients.clone()),
            Some(initializer(|ctx| {
                let values = [
                    ("X", 1, 1.0),
                    ("Y", 1, 2.0),
                    ("Z", 1, 3.0),
                    ("X", 2, 1.0),
                    ("Y", 2, 1.0),
                    ("Z", 2, 0.0),
                ];
                for (var, equation, value) in values {
                    let name = ctx.name(&prefixes![var, equation])?;
                    ctx.model().create_constant_in(&name, value, ctx.group())?;
                }
                Ok(())
            })),
        )
        .unwrap();

    let rhs = rhs_names();
    model
        .create_constant_group_with(
            "ConstantValues",
            "Right-hand sides",
            Some(rhs.clone()),
            Some(initializer(|ctx| {
                ctx.model()
                    .create_constant_in(&ctx.name(&prefixes![1])?, 4.0, ctx.group())?;
                ctx.model()
                    .create_constant_in(&ctx.name(&prefixes![2])?, 1.0, ctx.group())?;
                Ok(())
            })),
        )
        .unwrap();

    model
        .create_constraint_group_with(
            "Constraints",
            "all constraints of the model",
            Some(equation_names()),
            Some(initializer(move |ctx| {
                let model = ctx.model();
                for equation in 1..=EQUATIONS {
                    let operator = if equation == 1 {
                        Operator::LessEqual
                    } else {
                        Operator::GreaterEqual
                    };
                    let mut right = model.expression();
                    right.add_constant_value(&model.constant(&rhs.name(&prefixes![equation])?)?);

                    let mut left = model.expression();
                    for var in VARS {
                        let constant =
                            model.constant(&coefficients.name(&prefixes![var, equation])?)?;
                        left.add_scaled_by_constant(&constant, &model.var(var)?)?;
                    }
                    let name = ctx.name(&prefixes![equation])?;
                    model.add_constraint_in(&name, left, operator, right, ctx.group())?;
                }
                Ok(())
            })),
        )
        .unwrap();

    model
        .attach_objective_generator(ObjectiveType::Maximize, |model| {
            let mut expression = model.expression();
            expression
                .add_var(&model.var("X")?)?
                .add_var(&model.var("Y")?)?
                .add_scaled(2.0, &model.var("Z")?)?;
            Ok(expression)
        })
        .unwrap();

    model
}

#[test]
fn initializers_build_the_whole_model() {
    let mut model = build();
    assert!(model.vars().is_empty());
    model.init().unwrap();
    assert_eq!(model.state(), ModelState::Initialized);

    for var in VARS {
        assert_eq!(model.var_ids_in(var).unwrap(), vec![var]);
        assert!(model.var_handle(var).is_some());
    }
    assert_eq!(model.constant_ids_in("ConstantPrefix").unwrap().len(), 6);
    assert_eq!(
        model.constraint_ids_in("Constraints").unwrap(),
        vec!["Constraint-/-1", "Constraint-/-2"]
    );

    let first = model.constraint("Constraint-/-1").unwrap().canonical_row();
    assert_eq!(first.operator, Operator::LessEqual);
    assert_eq!(first.rhs, 4.0);
    let coefficients: BTreeMap<String, f64> = first.terms.into_iter().collect();
    assert_eq!(coefficients["X"], 1.0);
    assert_eq!(coefficients["Y"], 2.0);
    assert_eq!(coefficients["Z"], 3.0);

    let second = model.constraint("Constraint-/-2").unwrap().canonical_row();
    assert_eq!(second.operator, Operator::GreaterEqual);
    assert_eq!(second.rhs, 1.0);

    let objective = model.objective().unwrap();
    assert_eq!(objective.objective_type, ObjectiveType::Maximize);
    assert_eq!(
        objective.expression.var_contribution()["Z"],
        2.0
    );
    assert_eq!(model.backend_model().unwrap().rows().len(), 2);
}

#[test]
fn coefficient_names_are_validated() {
    let generator = coefficient_names();
    assert_eq!(generator.name(&prefixes!["Y", 2]).unwrap(), "C-/-Y-/-2");
    assert!(matches!(
        generator.name(&prefixes!["W", 1]),
        Err(NameError::Rejected(_))
    ));
    assert!(matches!(
        generator.name(&prefixes!["X", 3]),
        Err(NameError::Rejected(_))
    ));
    assert!(matches!(
        generator.name(&prefixes![1, 1]),
        Err(NameError::Rejected(_))
    ));
    assert!(matches!(
        generator.name(&prefixes!["X"]),
        Err(NameError::ArityMismatch {
            expected: 2,
            provided: 1
        })
    ));
}

#[test]
fn rejected_generated_name_fails_initialization() {
    let mut model = Model::new("bad-names", SkeletonBackend::new());
    model
        .create_constant_group_with(
            "Values",
            "",
            Some(rhs_names()),
            Some(initializer(|ctx| {
                ctx.model()
                    .create_constant_in(&ctx.name(&prefixes![EQUATIONS + 1])?, 1.0, ctx.group())?;
                Ok(())
            })),
        )
        .unwrap();
    assert!(matches!(
        model.init(),
        Err(ModelError::Name(NameError::Rejected(_)))
    ));
    assert_eq!(model.state(), ModelState::Failed);
}

#[test]
fn group_without_generator_cannot_name_members() {
    let model = Model::new("plain", SkeletonBackend::new());
    let group = model.create_var_group("Plain", "no generator").unwrap();
    assert!(matches!(
        group.name(&prefixes![1]),
        Err(NameError::NoGenerator)
    ));
    assert!(model.var_group("Default").unwrap().is_default());
}

#[test]
fn initializers_can_create_groups_for_the_running_phase() {
    let mut model = Model::new("nested", SkeletonBackend::new());
    model
        .create_var_group_with(
            "Outer",
            "",
            None,
            Some(initializer(|ctx| {
                let model = ctx.model();
                model.create_var_in("a", VarType::Double, 0.0, 1.0, ctx.group())?;
                model.create_var_group_with(
                    "Inner",
                    "",
                    None,
                    Some(initializer(|ctx| {
                        ctx.model()
                            .create_var_in("b", VarType::Double, 0.0, 1.0, ctx.group())?;
                        Ok(())
                    })),
                )?;
                Ok(())
            })),
        )
        .unwrap();
    model.init().unwrap();
    assert_eq!(model.var_ids_in("Inner").unwrap(), vec!["b"]);
    assert!(model.var_handle("b").is_some());
}

#[test]
fn phases_run_in_declaration_order() {
    let phases = [
        LifecyclePhase::InitModel,
        LifecyclePhase::InitConstantGroups,
        LifecyclePhase::InitVarGroups,
        LifecyclePhase::InitVars,
        LifecyclePhase::InitConstraintGroups,
        LifecyclePhase::InitConstraints,
        LifecyclePhase::InitObjective,
    ];
    assert!(phases.windows(2).all(|pair| pair[0] < pair[1]));
}
