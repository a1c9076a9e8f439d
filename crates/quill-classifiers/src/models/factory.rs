use crate::config::ModelType;
use crate::error::Result;
use crate::models::adaboost::AdaBoostClassifier;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::decision_tree::DecisionTreeClassifier;
use crate::models::gbdt::GBDTClassifier;
use crate::models::knn::KNeighborsClassifier;
use crate::models::svm::SVMClassifier;

/// Build a boxed, unfitted classifier model from its hyper-parameters.
pub fn build_model(params: &ModelType) -> Result<Box<dyn ClassifierModel>> {
    Ok(match params {
        ModelType::SVM { .. } => Box::new(SVMClassifier::new(params)?),
        ModelType::KNeighbors { .. } => Box::new(KNeighborsClassifier::new(params)?),
        ModelType::DecisionTree { .. } => Box::new(DecisionTreeClassifier::new(params)?),
        ModelType::AdaBoost { .. } => Box::new(AdaBoostClassifier::new(params)?),
        ModelType::GBDT { .. } => Box::new(GBDTClassifier::new(params)?),
    })
}
