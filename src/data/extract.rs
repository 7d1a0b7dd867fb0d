use crate::{
    bpmn::{
        ATTR_CALLED_ELEMENT, ATTR_CLASS, ATTR_ID, ATTR_NAME, CALL_ACTIVITY, CAMUNDA_INPUT_PARAMETER,
        CAMUNDA_NS, CAMUNDA_SCRIPT, SERVICE_TASK,
    },
    context::XmlContext,
    data::{
        ActivityNode, ActivityType, DEFAULT_INPUT_PARAM, DEFAULT_SCRIPT_PARAM, ExtractResult,
        Parameter, SCRIPT_PLACEHOLDER, Script, UNKNOWN, is_script_expression, simplify_class_name,
    },
    document::{Document, Element, ElementId},
};
use log::debug;

/// Collect activities, input parameters and scripts of `context`.
pub fn extract_data(context: &XmlContext) -> ExtractResult {
    let document = context.document();

    let mut nodes = extract_call_activities(document);
    nodes.extend(extract_service_tasks(document));

    // Script elements first, then scripts found in parameter text.
    let mut scripts = extract_script_elements(context);
    let (parameters, inline_scripts) = extract_input_parameters(context);
    scripts.extend(inline_scripts);

    debug!(
        "{}: {} activities, {} parameters, {} scripts",
        context.path().display(),
        nodes.len(),
        parameters.len(),
        scripts.len()
    );
    ExtractResult {
        nodes,
        parameters,
        scripts,
    }
}

/// Id of the nearest element, starting with `id` itself, that carries a non-empty `id`.
pub fn find_parent_with_id(document: &Document, id: ElementId) -> &str {
    document
        .ancestors(id)
        .find_map(|(_, element)| element.attribute(ATTR_ID).filter(|id| !id.is_empty()))
        .unwrap_or(UNKNOWN)
}

fn owner_name<'a>(context: &'a XmlContext, id: ElementId) -> &'a str {
    context.name_of(find_parent_with_id(context.document(), id))
}

fn activity_name(element: &Element) -> String {
    element
        .attribute(ATTR_NAME)
        .or_else(|| element.attribute(ATTR_ID))
        .unwrap_or(UNKNOWN)
        .into()
}

fn extract_call_activities(document: &Document) -> Vec<ActivityNode> {
    document
        .select(CALL_ACTIVITY)
        .map(|(_, element)| ActivityNode {
            name: activity_name(element),
            activity_type: ActivityType::CallActivity,
            target: element
                .attribute(ATTR_CALLED_ELEMENT)
                .unwrap_or_default()
                .into(),
        })
        .collect()
}

fn extract_service_tasks(document: &Document) -> Vec<ActivityNode> {
    document
        .select(SERVICE_TASK)
        .map(|(_, element)| ActivityNode {
            name: activity_name(element),
            activity_type: ActivityType::ServiceTask,
            target: simplify_class_name(
                element
                    .attribute_ns(CAMUNDA_NS, ATTR_CLASS)
                    .unwrap_or_default(),
            )
            .into(),
        })
        .collect()
}

// Every script element is a script, whatever its text.
fn extract_script_elements(context: &XmlContext) -> Vec<Script> {
    let document = context.document();
    document
        .select(CAMUNDA_SCRIPT)
        .map(|(id, element)| Script {
            text: element.text().unwrap_or_default().into(),
            node_name: owner_name(context, id).into(),
            param_name: document
                .parent(id)
                .and_then(|parent| parent.attribute(ATTR_NAME))
                .unwrap_or(DEFAULT_SCRIPT_PARAM)
                .into(),
        })
        .collect()
}

enum ParameterContent<'a> {
    // Already collected by the script element pass
    NestedScript,
    Expression(&'a str),
    Value(&'a str),
    Empty,
}

impl<'a> ParameterContent<'a> {
    fn classify(document: &Document, id: ElementId, element: &'a Element) -> Self {
        if document.find(id, CAMUNDA_SCRIPT).is_some() {
            return ParameterContent::NestedScript;
        }
        match element.text() {
            Some(text) if !text.is_empty() && is_script_expression(text) => {
                ParameterContent::Expression(text)
            }
            Some(text) if !text.is_empty() => ParameterContent::Value(text),
            _ => ParameterContent::Empty,
        }
    }
}

fn extract_input_parameters(context: &XmlContext) -> (Vec<Parameter>, Vec<Script>) {
    let document = context.document();
    let mut parameters = Vec::new();
    let mut scripts = Vec::new();

    for (id, element) in document.select(CAMUNDA_INPUT_PARAMETER) {
        let node_name = owner_name(context, id);
        let param_name = element.attribute(ATTR_NAME).unwrap_or(DEFAULT_INPUT_PARAM);
        let parameter = |value: &str, has_script| Parameter {
            node_name: node_name.into(),
            param_name: param_name.into(),
            value: value.into(),
            has_script,
        };

        match ParameterContent::classify(document, id, element) {
            ParameterContent::NestedScript => parameters.push(parameter(SCRIPT_PLACEHOLDER, true)),
            ParameterContent::Expression(text) => {
                parameters.push(parameter(SCRIPT_PLACEHOLDER, true));
                scripts.push(Script {
                    text: text.into(),
                    node_name: node_name.into(),
                    param_name: param_name.into(),
                });
            }
            ParameterContent::Value(text) => parameters.push(parameter(text, false)),
            ParameterContent::Empty => parameters.push(parameter("", false)),
        }
    }

    (parameters, scripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bpmn::Selector, error::Error};

    fn context(process: &str) -> Result<XmlContext, Error> {
        format!(
            r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"
                 xmlns:camunda="http://camunda.org/schema/1.0/bpmn">
                 <bpmn:process id="p" name="Process">{process}</bpmn:process>
               </bpmn:definitions>"#
        )
        .parse()
    }

    #[test]
    fn call_activities_come_before_service_tasks() -> Result<(), Error> {
        let context = context(
            r#"<bpmn:serviceTask id="st" name="Approve" camunda:class="com.example.Approve"/>
               <bpmn:callActivity id="ca1" name="Billing" calledElement="billing-process"/>
               <bpmn:serviceTask id="st2" class="not.camunda.Ignored"/>
               <bpmn:callActivity id="ca2"/>"#,
        )?;
        let result = extract_data(&context);

        let nodes: Vec<_> = result
            .nodes
            .iter()
            .map(|n| (n.name.as_str(), n.activity_type, n.target.as_str()))
            .collect();
        assert_eq!(
            nodes,
            [
                ("Billing", ActivityType::CallActivity, "billing-process"),
                ("ca2", ActivityType::CallActivity, ""),
                ("Approve", ActivityType::ServiceTask, "Approve"),
                ("st2", ActivityType::ServiceTask, ""),
            ]
        );
        Ok(())
    }

    #[test]
    fn parameters_follow_the_classification_order() -> Result<(), Error> {
        let context = context(
            r#"<bpmn:serviceTask id="st" name="Send">
                 <bpmn:extensionElements>
                   <camunda:inputOutput>
                     <camunda:inputParameter name="nested">ignored text<camunda:script scriptFormat="jexl">a + b</camunda:script></camunda:inputParameter>
                     <camunda:inputParameter name="inline">${ a + b }</camunda:inputParameter>
                     <camunda:inputParameter name="template">${a}</camunda:inputParameter>
                     <camunda:inputParameter name="empty"/>
                     <camunda:inputParameter>unnamed</camunda:inputParameter>
                   </camunda:inputOutput>
                 </bpmn:extensionElements>
               </bpmn:serviceTask>"#,
        )?;
        let result = extract_data(&context);

        let parameter = |param_name: &str, value: &str, has_script| Parameter {
            node_name: "Send".into(),
            param_name: param_name.into(),
            value: value.into(),
            has_script,
        };
        assert_eq!(
            result.parameters,
            [
                parameter("nested", SCRIPT_PLACEHOLDER, true),
                parameter("inline", SCRIPT_PLACEHOLDER, true),
                parameter("template", "${a}", false),
                parameter("empty", "", false),
                parameter(DEFAULT_INPUT_PARAM, "unnamed", false),
            ]
        );

        // The script element first, then the inline expression. Nothing twice.
        assert_eq!(
            result.scripts,
            [
                Script {
                    text: "a + b".into(),
                    node_name: "Send".into(),
                    param_name: "nested".into(),
                },
                Script {
                    text: "${ a + b }".into(),
                    node_name: "Send".into(),
                    param_name: "inline".into(),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_script_elements_are_kept() -> Result<(), Error> {
        let context = context(
            r#"<bpmn:task id="t">
                 <bpmn:extensionElements>
                   <camunda:executionListener event="start">
                     <camunda:script scriptFormat="jexl"/>
                   </camunda:executionListener>
                 </bpmn:extensionElements>
               </bpmn:task>"#,
        )?;
        let result = extract_data(&context);
        assert_eq!(
            result.scripts,
            [Script {
                text: String::new(),
                node_name: "t".into(),
                param_name: DEFAULT_SCRIPT_PARAM.into(),
            }]
        );
        assert!(result.parameters.is_empty());
        Ok(())
    }

    #[test]
    fn parent_walk_stops_at_nearest_id() -> Result<(), Error> {
        let context: XmlContext = r#"<root>
              <camunda:inputParameter xmlns:camunda="http://camunda.org/schema/1.0/bpmn" name="orphan">v</camunda:inputParameter>
              <holder id="h" name="Holder"><inner id=""><leaf/></inner></holder>
            </root>"#
            .parse()?;
        let document = context.document();

        let (orphan, _) = document
            .select(CAMUNDA_INPUT_PARAMETER)
            .next()
            .ok_or_else(|| Error::invalid_xml("test", "no parameter"))?;
        assert_eq!(find_parent_with_id(document, orphan), UNKNOWN);

        let leaf = document
            .iter()
            .find(|(_, element)| element.local_name() == "leaf")
            .map(|(id, _)| id)
            .ok_or_else(|| Error::invalid_xml("test", "no leaf"))?;
        assert_eq!(find_parent_with_id(document, leaf), "h");
        assert_eq!(owner_name(&context, leaf), "Holder");

        let result = extract_data(&context);
        assert_eq!(result.parameters[0].node_name, UNKNOWN);
        Ok(())
    }

    #[test]
    fn element_with_id_owns_itself() -> Result<(), Error> {
        let context = context(r#"<bpmn:task id="t" name="Task"/>"#)?;
        let document = context.document();
        let (task, _) = document
            .select(Selector::bpmn("task"))
            .next()
            .ok_or_else(|| Error::invalid_xml("test", "no task"))?;
        assert_eq!(find_parent_with_id(document, task), "t");
        Ok(())
    }
}
