use serde_json::{Value, json};

use llmgate_common::GatewayError;
use llmgate_config::Target;

/// Evaluation context for conditional routing: parsed `x-portkey-metadata`
/// and the request's JSON parameters (`{}` when the body is not JSON).
pub struct RouteParams {
    pub metadata: Value,
    pub params: Value,
}

/// Conditional-routing collaborator. Returns the selected child's original
/// index within the node's `targets`; every failure is a router error, which
/// surfaces as HTTP 400 without the gateway-exception marker.
pub trait ConditionalRouter: Send + Sync {
    fn select(&self, target: &Target, route: &RouteParams) -> Result<usize, GatewayError>;
}

/// Query evaluator over `{metadata, params}` with mongo-style operators:
/// implicit equality, `$eq`, `$ne`, `$in`, `$nin`, `$gt`, `$gte`, `$lt`,
/// `$lte`, `$exists`, combined with `$and` / `$or`. Field paths are dotted,
/// e.g. `metadata.user_plan`.
pub struct QueryConditionalRouter;

impl ConditionalRouter for QueryConditionalRouter {
    fn select(&self, target: &Target, route: &RouteParams) -> Result<usize, GatewayError> {
        let strategy = target
            .strategy
            .as_ref()
            .ok_or_else(|| GatewayError::router("conditional strategy is missing"))?;
        let conditions = strategy
            .conditions
            .as_ref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| GatewayError::router("conditional strategy requires conditions"))?;

        let data = json!({"metadata": &route.metadata, "params": &route.params});
        for condition in conditions {
            if eval_query(&condition.query, &data)? {
                return resolve_reference(target, &condition.then_target);
            }
        }
        match &strategy.default {
            Some(default) => resolve_reference(target, default),
            None => Err(GatewayError::router(
                "no matching route condition and no default target",
            )),
        }
    }
}

fn resolve_reference(target: &Target, reference: &str) -> Result<usize, GatewayError> {
    let targets = target
        .targets
        .as_ref()
        .ok_or_else(|| GatewayError::router("conditional strategy has no targets"))?;
    if let Some(index) = targets
        .iter()
        .position(|t| t.name.as_deref() == Some(reference))
    {
        return Ok(index);
    }
    if let Ok(index) = reference.parse::<usize>()
        && index < targets.len()
    {
        return Ok(index);
    }
    Err(GatewayError::router(format!(
        "route condition points to unknown target: {reference}"
    )))
}

fn eval_query(query: &Value, data: &Value) -> Result<bool, GatewayError> {
    let Value::Object(clauses) = query else {
        return Err(GatewayError::router("route condition query must be an object"));
    };
    for (key, expected) in clauses {
        let holds = match key.as_str() {
            "$and" => expected
                .as_array()
                .ok_or_else(|| GatewayError::router("$and expects an array"))?
                .iter()
                .try_fold(true, |acc, q| Ok::<_, GatewayError>(acc && eval_query(q, data)?))?,
            "$or" => expected
                .as_array()
                .ok_or_else(|| GatewayError::router("$or expects an array"))?
                .iter()
                .try_fold(false, |acc, q| Ok::<_, GatewayError>(acc || eval_query(q, data)?))?,
            path => eval_field(expected, resolve_path(data, path))?,
        };
        if !holds {
            return Ok(false);
        }
    }
    Ok(true)
}

fn resolve_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn eval_field(matcher: &Value, actual: Option<&Value>) -> Result<bool, GatewayError> {
    let Value::Object(ops) = matcher else {
        // implicit equality for scalar matchers
        return Ok(actual == Some(matcher));
    };
    if !ops.keys().any(|k| k.starts_with('$')) {
        return Ok(actual == Some(matcher));
    }

    for (op, operand) in ops {
        let holds = match op.as_str() {
            "$eq" => actual == Some(operand),
            "$ne" => actual != Some(operand),
            "$in" => operand
                .as_array()
                .ok_or_else(|| GatewayError::router("$in expects an array"))?
                .iter()
                .any(|candidate| actual == Some(candidate)),
            "$nin" => !operand
                .as_array()
                .ok_or_else(|| GatewayError::router("$nin expects an array"))?
                .iter()
                .any(|candidate| actual == Some(candidate)),
            "$exists" => {
                let want = operand.as_bool().unwrap_or(true);
                actual.is_some() == want
            }
            "$gt" | "$gte" | "$lt" | "$lte" => {
                let (Some(left), Some(right)) =
                    (actual.and_then(Value::as_f64), operand.as_f64())
                else {
                    return Ok(false);
                };
                match op.as_str() {
                    "$gt" => left > right,
                    "$gte" => left >= right,
                    "$lt" => left < right,
                    _ => left <= right,
                }
            }
            other => {
                return Err(GatewayError::router(format!(
                    "unsupported query operator: {other}"
                )));
            }
        };
        if !holds {
            return Ok(false);
        }
    }
    Ok(true)
}
